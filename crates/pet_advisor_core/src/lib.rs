pub mod catalog;
pub mod domain;
pub mod events;
pub mod exchange;
pub mod ports;
pub mod registry;
pub mod transcript;

pub use catalog::{lookup, FeaturedFood, SafetyDetails, SafetyLevel, SafetyRecord};
pub use domain::{AskRequest, Message, PetContext, PetProfile, Role, Species};
pub use events::{EventStreamDecoder, Record, StreamEvent};
pub use exchange::{Exchange, Flow};
pub use ports::{AdvisoryService, ByteStream, PortError, PortResult};
pub use registry::{match_pet, PetRegistry, RegistryError};
pub use transcript::Transcript;
