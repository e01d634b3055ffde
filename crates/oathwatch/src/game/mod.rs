mod pet;
mod scene;
mod snapshot;
mod status;
mod writer;

pub use pet::{PetRecord, find_pet, read_pet, read_pet_roster};
pub use scene::{Scene, SceneTable, UNKNOWN_SCENE};
pub use snapshot::{CharacterSnapshot, CharacterStats, MapInfo, Position, SnapshotReader};
pub use status::{HealthStatus, LOGIN_PLACEHOLDER, LoginState, percent};
pub use writer::StatsWriter;
