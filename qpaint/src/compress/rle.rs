//! Marker-byte run-length coding.
//!
//! ```plain
//! .- repeated run -----------------------.
//! |  marker: 1..=127  |  value           |
//! `--------------------------------------`
//! .- literal run ------------------------------------.
//! |  marker: 128..=255  |  marker - 127 raw bytes    |
//! `--------------------------------------------------`
//! ```
//!
//! A repeated run emits `value` `marker` times. A literal run copies the next `marker - 127`
//! bytes (1..=128). Marker `0` is never produced and is rejected on decode.

use super::StreamCodec;
use snafu::{ensure, Snafu};

/// Shortest run worth a repeated-run marker; two equal bytes cost the same either way.
const MIN_RUN: usize = 3;
const MAX_RUN: usize = 127;
const MAX_LITERAL: usize = 128;

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(module)]
pub enum RleError {
    #[snafu(display("invalid run marker 0 at offset {offset}"))]
    InvalidMarker { offset: usize },
    #[snafu(display("stream ends in the middle of a run"))]
    UnexpectedEof,
}

/// The run-length scheme understood by the firmware's byte decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerRle;

impl StreamCodec for MarkerRle {
    type Error = RleError;

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + data.len() / MAX_LITERAL + 1);
        let mut literal_start = 0;
        let mut i = 0;

        while i < data.len() {
            let value = data[i];
            let run = data[i..]
                .iter()
                .take(MAX_RUN)
                .take_while(|&&b| b == value)
                .count();

            if run >= MIN_RUN {
                flush_literals(&mut out, &data[literal_start..i]);
                out.extend_from_slice(&[run as u8, value]);
                i += run;
                literal_start = i;
            } else {
                i += 1;
                if i - literal_start == MAX_LITERAL {
                    flush_literals(&mut out, &data[literal_start..i]);
                    literal_start = i;
                }
            }
        }
        flush_literals(&mut out, &data[literal_start..]);

        tracing::debug!(raw = data.len(), encoded = out.len(), "run-length encoded stream");
        out
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, RleError> {
        let mut ctx = RleDecodeContext::new();
        let mut out = Vec::with_capacity(data.len());
        let mut buf = [0u8; 256];
        let mut input = data;

        loop {
            let (consumed, written) = ctx.decode_to_slice(input, &mut buf)?;
            out.extend_from_slice(&buf[..written]);
            input = &input[consumed..];
            if consumed == 0 && written == 0 {
                break;
            }
        }

        ensure!(ctx.is_idle(), rle_error::UnexpectedEofSnafu);
        Ok(out)
    }
}

fn flush_literals(out: &mut Vec<u8>, literals: &[u8]) {
    if !literals.is_empty() {
        out.push((literals.len() + 127) as u8);
        out.extend_from_slice(literals);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RleState {
    Marker,
    Literal { remaining: u8 },
    RepeatValue { count: u8 },
    Repeat { value: u8, remaining: u8 },
}

/// Incremental decoder that can be fed input and drained into output in pieces of any size,
/// so neither side has to hold the whole stream.
#[derive(Debug, Clone, Copy)]
pub struct RleDecodeContext {
    state: RleState,
    position: usize,
}

impl Default for RleDecodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RleDecodeContext {
    pub const fn new() -> Self {
        Self {
            state: RleState::Marker,
            position: 0,
        }
    }

    /// Whether the decoder sits on a run boundary, i.e. a stream may legally end here.
    pub fn is_idle(&self) -> bool {
        self.state == RleState::Marker
    }

    /// Decodes from `input` into `output` until the input is exhausted or the output is full.
    ///
    /// Returns `(consumed, written)`. The decoder keeps its position inside a run, so the
    /// next call continues where this one stopped; pass the unconsumed input again.
    pub fn decode_to_slice(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), RleError> {
        let (mut consumed, mut written) = (0, 0);

        loop {
            if let RleState::Repeat { value, remaining } = self.state {
                let n = usize::from(remaining).min(output.len() - written);
                output[written..written + n].fill(value);
                written += n;

                let remaining = remaining - n as u8;
                if remaining > 0 {
                    self.state = RleState::Repeat { value, remaining };
                    break;
                }
                self.state = RleState::Marker;
                continue;
            }

            if written == output.len() {
                break;
            }
            let Some(&byte) = input.get(consumed) else {
                break;
            };
            consumed += 1;
            self.position += 1;

            self.state = match self.state {
                RleState::Marker => match byte {
                    0 => {
                        return Err(RleError::InvalidMarker {
                            offset: self.position - 1,
                        })
                    }
                    1..=127 => RleState::RepeatValue { count: byte },
                    _ => RleState::Literal {
                        remaining: byte - 127,
                    },
                },
                RleState::RepeatValue { count } => RleState::Repeat {
                    value: byte,
                    remaining: count,
                },
                RleState::Literal { remaining } => {
                    output[written] = byte;
                    written += 1;
                    match remaining {
                        1 => RleState::Marker,
                        _ => RleState::Literal {
                            remaining: remaining - 1,
                        },
                    }
                }
                RleState::Repeat { .. } => unreachable!("repeated runs are drained above"),
            };
        }

        Ok((consumed, written))
    }
}
