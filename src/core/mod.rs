pub mod apportionment;
pub mod context;
pub mod engine;
pub mod layout;
pub mod ledger;
pub mod packing;
pub mod registry;
pub mod regrouping;
pub mod simulator;

pub use crate::domain::ports::{ConfigProvider, SessionSource, Storage};
pub use crate::utils::error::Result;
pub use apportionment::{allocate, Apportionment, ApportionmentEngine, RegionOutcome};
pub use context::SessionContext;
pub use engine::{SessionEngine, SessionReport};
pub use layout::{Hierarchy, LayoutProjector, PackedLayout};
pub use ledger::VoteLedger;
pub use registry::{AllianceRegistry, Mutation};
pub use regrouping::{hit_test, DropDecision, GestureState, RegroupingController};
pub use simulator::{Cycle, GestureOutcome, PointerEvent, SessionSnapshot, Simulator};
