//! Line-framed token protocol.
//!
//! Wire format, one frame per line:
//!
//! ```text
//! <sentinel>:<json-value>\n
//! ```
//!
//! Only `0:"<json-escaped text>"` is meaningful here. The module is split in
//! two stages that mirror the decode path:
//!
//! - `decoder`: byte chunks → complete lines (`FrameDecoder`, `Frames`,
//!   `decode_lines`)
//! - `frame`: lines → tokens (`TokenFrameParser`), plus the inverse
//!   `encode_token_frame` used by producers

mod decoder;
mod frame;

pub use decoder::{FrameDecoder, Frames, TrailingLinePolicy, decode_lines, frames};
pub use frame::{FrameKind, FrameStats, TOKEN_SENTINEL, TokenFrameParser, encode_token_frame};
