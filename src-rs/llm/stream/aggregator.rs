use anyhow::Result;
use serde_json::Value;
use tokio_stream::{Stream, StreamExt};

use crate::cons::provider_cons::LLMProvider;
use crate::error::ReviewError;

use super::buffer::StreamBuffer;
use super::chunk::normalize;
use super::sink::DisplaySink;

/// Drives one provider stream into a [`StreamBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct StreamAggregator {
    provider: LLMProvider,
}

impl StreamAggregator {
    pub fn new(provider: LLMProvider) -> Self {
        Self { provider }
    }

    /// Consumes `chunks` in arrival order until the sequence ends or a chunk
    /// signals stop. After every appended fragment, including empty ones, the
    /// sink gets the whole buffer.
    ///
    /// An `Err` item from the sequence is a transport failure; the text
    /// gathered so far travels inside [`ReviewError::StreamInterrupted`].
    pub async fn aggregate<S>(
        &self,
        mut chunks: S,
        sink: &mut dyn DisplaySink,
        mut buffer: StreamBuffer,
    ) -> Result<StreamBuffer, ReviewError>
    where
        S: Stream<Item = Result<Value>> + Unpin,
    {
        let mut received = 0u64;

        while let Some(item) = chunks.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(cause) => {
                    log::warn!(
                        "Stream for {} interrupted after {} chunks: {}",
                        buffer.key(),
                        received,
                        cause
                    );
                    return Err(ReviewError::StreamInterrupted {
                        partial: buffer.into_string(),
                        received,
                        cause,
                    });
                }
            };
            received += 1;
            log::trace!("{} chunk #{}: {}", self.provider, received, chunk);

            let delta = normalize(self.provider, &chunk)?;
            if delta.stop {
                log::debug!("{} signalled stop at chunk #{}", self.provider, received);
                break;
            }

            buffer.push_str(&delta.text);
            sink.markdown(buffer.as_str());
        }

        log::debug!(
            "Stream for {} finished: chunks={}, chars={}",
            buffer.key(),
            received,
            buffer.as_str().chars().count()
        );
        Ok(buffer)
    }
}
