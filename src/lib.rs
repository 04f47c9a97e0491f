//! Elementary-stream bridge.
//!
//! Host side of a remote-control bridge between a media engine and an
//! isolated module. Host applications depend on `esbridge`, attach the host
//! objects they have through [`HostServices`], and feed request frames to a
//! [`BridgeSession`].
//!
//! ```
//! use esbridge::config::BridgeConfig;
//! use esbridge::media::{FieldSpan, FormatLayout};
//! use esbridge::{BridgeSession, Envelope, HostServices, Request};
//!
//! let config = BridgeConfig::builder()
//!     .format_layout(FormatLayout {
//!         header_size: 64,
//!         extra_len: FieldSpan::new(16, 4),
//!         extra_ptr: FieldSpan::new(24, 8),
//!         extra_languages_len: FieldSpan::new(32, 4),
//!         extra_languages_ptr: FieldSpan::new(40, 8),
//!     })
//!     .build()?;
//!
//! // No control object attached: the query is rejected
//! let mut session = BridgeSession::new(config, HostServices::new())?;
//! let reply = session.handle_frame(Request::CanSeek.encode()?)?;
//! assert!(!Envelope::decode(reply)?.is_serviced());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use bridge_traits::{access, control, es_out, media};
pub use core_bridge::{HandleError, RequestError};
pub use core_codec::{CodecError, ControlReply, Envelope, EsBlock, EsFormat, Opcode, Request, Response};
pub use core_runtime::{config, logging};
pub use core_service::{BridgeSession, HostServices, SessionError, SessionId};
