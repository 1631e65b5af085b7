//! The offer protocol: the handshake a client performs on its first
//! outbound unidirectional stream.

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

// Layer 3: Internal module imports
use crate::framing::DELIMITER;

/// What a subscriber declares at connection time: an opaque token and an
/// ordered sequence of requested topic patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub token: String,
    pub topics: Vec<String>,
}

impl Offer {
    pub fn new(token: impl Into<String>, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            token: token.into(),
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OfferError {
    #[error("failed to open the offer stream")]
    StreamUnavailable,

    #[error("failed to read offer record: {0}")]
    Read(#[source] std::io::Error),

    #[error("offer stream closed before a delimiter was seen")]
    Truncated,

    #[error("failed to decode offer record: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Reads one delimited record from `stream` and decodes it as an [`Offer`].
///
/// Reads incrementally via a buffered reader rather than a fixed-size
/// read, so an offer that arrives split across multiple transport
/// packets is still assembled correctly before the delimiter is seen.
pub async fn accept_offer<R: AsyncRead + Unpin>(stream: R) -> Result<Offer, OfferError> {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    let n = reader
        .read_until(DELIMITER, &mut buf)
        .await
        .map_err(OfferError::Read)?;

    if n == 0 || buf.last() != Some(&DELIMITER) {
        return Err(OfferError::Truncated);
    }

    buf.pop();
    serde_json::from_slice(&buf).map_err(OfferError::Decode)
}

/// Writes the client-side half of the handshake: the offer record
/// followed by the delimiter. The caller is responsible for closing the
/// stream afterwards.
pub async fn send_offer<W: AsyncWrite + Unpin>(stream: &mut W, offer: &Offer) -> Result<(), OfferError> {
    let bytes = serde_json::to_vec(offer).map_err(OfferError::Decode)?;
    stream.write_all(&bytes).await.map_err(OfferError::Read)?;
    stream.write_all(&[DELIMITER]).await.map_err(OfferError::Read)?;
    Ok(())
}
