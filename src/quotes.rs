use rand::Rng;
use serde::Deserialize;

const BUNDLED_QUOTES: &str = include_str!("../assets/quotes.json");

/// A quote picked from the store. `id` is its index in the store and is what deep
/// links carry, so it stays stable as long as the store order does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub id: u32,
    pub text: String,
    pub author: String,
}

#[derive(Clone, Debug, Deserialize)]
struct QuoteRecord {
    content: String,
    author: String,
}

#[derive(Debug, thiserror::Error)]
pub enum QuoteStoreError {
    #[error("quote store is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("quote store contains no quotes")]
    Empty,
    #[error("quote store holds more quotes than fit in a u32 id")]
    TooLarge,
}

/// Read-only, order-stable list of quotes.
#[derive(Clone, Debug)]
pub struct QuoteStore {
    records: Vec<QuoteRecord>,
}

impl QuoteStore {
    pub fn bundled() -> Result<Self, QuoteStoreError> {
        Self::from_json(BUNDLED_QUOTES)
    }

    pub fn from_json(json: &str) -> Result<Self, QuoteStoreError> {
        let records: Vec<QuoteRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, QuoteStoreError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let records = pairs
            .into_iter()
            .map(|(content, author)| QuoteRecord {
                content: content.into(),
                author: author.into(),
            })
            .collect();
        Self::from_records(records)
    }

    fn from_records(records: Vec<QuoteRecord>) -> Result<Self, QuoteStoreError> {
        if records.is_empty() {
            return Err(QuoteStoreError::Empty);
        }
        if u32::try_from(records.len()).is_err() {
            return Err(QuoteStoreError::TooLarge);
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<Quote> {
        self.records.get(id as usize).map(|record| Quote {
            id,
            text: record.content.clone(),
            author: record.author.clone(),
        })
    }

    /// Picks the quote at `index` when it addresses an existing record, otherwise a
    /// uniformly random one.
    pub fn select<R: Rng>(&self, index: Option<i64>, rng: &mut R) -> Quote {
        let requested = index
            .and_then(|i| u32::try_from(i).ok())
            .filter(|i| (*i as usize) < self.records.len());
        let id = match requested {
            Some(id) => id,
            None => {
                if let Some(raw) = index {
                    tracing::debug!(index = raw, "quote index out of range, picking at random");
                }
                // len fits in u32, checked at construction
                rng.random_range(0..self.records.len()) as u32
            }
        };
        let record = &self.records[id as usize];
        Quote {
            id,
            text: record.content.clone(),
            author: record.author.clone(),
        }
    }
}
