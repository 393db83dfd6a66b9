//! Deterministic simulation module
//!
//! All gameplay physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only (wall-clock delta feeds nothing but the nitro timer)
//! - Seeded RNG only, owned by the session
//! - Stable iteration order (wheels by index, then chassis, then booster)
//! - No rendering or platform dependencies
//!
//! Coordinate convention: world Y grows downward (screen space) while the Y
//! velocity component is up-positive, so position integration is
//! `x += vx; y -= vy`. The convention is inherited by every contact formula
//! in `wheel` and `chassis`.

pub mod chassis;
pub mod flip;
pub mod geom;
pub mod nitro;
pub mod session;
pub mod terrain;
pub mod wheel;

pub use chassis::{Attachment, Chassis, WheelLink};
pub use flip::FlipTracker;
pub use geom::Segment;
pub use nitro::{NitroBooster, NitroTransition};
pub use session::{Session, SessionConfig, SimEvent, TickInput};
pub use terrain::TerrainStream;
pub use wheel::{SuspensionLink, Wheel};
