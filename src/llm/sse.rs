// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server-sent events decoding for streamed model responses

use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::fmt::Display;

use super::types::LlmError;

/// Turn a byte stream into a stream of SSE event payloads
///
/// The stream ends after the first transport or parse error. Nothing is
/// retried or reconnected.
pub fn decode_events<S, B, E>(bytes: S) -> BoxStream<'static, Result<String, LlmError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    bytes
        .eventsource()
        .scan(false, |failed, event| {
            if *failed {
                return future::ready(None);
            }
            let item = match event {
                Ok(event) => Ok(event.data),
                Err(e) => {
                    *failed = true;
                    Err(LlmError::Stream(e.to_string()))
                }
            };
            future::ready(Some(item))
        })
        .boxed()
}
