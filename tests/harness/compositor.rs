use castinspo::{
    quotes::QuoteStore,
    render::{
        self,
        CardImage,
        RenderConfig,
        layout,
        typeface::Typeface,
    },
};
use rand::{
    SeedableRng,
    rngs::StdRng,
};

#[test]
fn compositor__every_bundled_quote_fits_or_uses_the_minimum_size() {
    // given
    let store = QuoteStore::bundled().unwrap();
    let config = RenderConfig::default();
    let body = Typeface::for_spec(config.fonts.for_role(render::FontRole::Body));

    for id in 0..store.len() as u32 {
        let quote = store.get(id).unwrap();

        // when
        let fitted = layout::fit(&quote.text, &config, &body);

        // then
        assert!(
            fitted.block_height <= config.safe_height() || fitted.font_px == config.min_font_px,
            "quote {id} overflows at {}px",
            fitted.font_px
        );
    }
}

#[test]
fn compositor__selected_quote_renders_identically_twice() {
    // given
    let store = QuoteStore::bundled().unwrap();
    let config = RenderConfig::default();
    let mut rng = StdRng::seed_from_u64(1);

    // when
    let first = store.select(Some(42), &mut rng);
    let second = store.select(Some(42), &mut rng);

    // then
    assert_eq!(first, second);
    assert_eq!(first.author, "Anon");
    assert_eq!(
        render::render_quote(&first, &config),
        render::render_quote(&second, &config)
    );
}

#[test]
fn compositor__out_of_range_index_falls_back_to_a_valid_quote() {
    // given
    let store = QuoteStore::bundled().unwrap();
    let mut rng = StdRng::seed_from_u64(9);

    // when
    let negative = store.select(Some(-1), &mut rng);
    let too_big = store.select(Some(store.len() as i64), &mut rng);

    // then
    assert!((negative.id as usize) < store.len());
    assert!((too_big.id as usize) < store.len());
}

#[test]
fn compositor__invalid_config_degrades_to_unavailable() {
    // given
    let config = RenderConfig {
        min_font_px: 80,
        ..RenderConfig::default()
    };

    // then
    assert_eq!(render::render("text", "author", &config), CardImage::Unavailable);
}
