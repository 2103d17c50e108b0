//! Core types for MuseShift

mod state;
mod record;
mod checkin;
mod session;
mod stats;
mod pathway;
mod command;
mod message;

pub use state::EnergyState;
pub use record::{SourceTag, RawRecord, TaggedRecord, RecordPage};
pub use checkin::{CanonicalCheckin, CheckinSource, Observation};
pub use session::{LocalSession, SessionEvent};
pub use stats::{Stats, TimeWindow, DataTab};
pub use pathway::{PathwayOption, PathwayOffer, PathwaySelection, GenerationRequest, SystemStatus};
pub use command::{BareCommand, ParsedInput};
pub use message::{Message, MessageKind, Reply, ReplyAction};
