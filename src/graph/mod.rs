mod build;
mod interaction;
mod model;
mod session;
mod simulator;
mod viewport;

pub use build::{GraphModelBuilder, LinkEnrichment, NoEnrichment, StaticCatalogue};
pub use interaction::{InteractionConfig, PointerEvent, SelectionEvent, SelectionState};
pub use model::{Filter, GraphLink, GraphModel, GraphNode};
pub use session::{GraphSession, SessionOptions};
pub use simulator::{SimulationConfig, SimulationState, SimulationStatus};
pub use viewport::Viewport;
