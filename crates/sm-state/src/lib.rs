//! sm-state: Waveform state, operation log and replay
//!
//! Owns everything that changes while an operator edits one channel:
//! - `waveform` - the per-channel ACC/VEL/DIS record and its lifecycle
//! - `correction` / `filtering` - the only mutations allowed on a waveform
//! - `recorder` - append/truncate operation log, replayed from the source
//! - `commit` - gate in front of product generation
//! - `annotation` - baseline steps embedded in product headers
//! - `session` - operator-facing editor tying the pieces together

mod annotation;
mod commit;
mod correction;
mod filtering;
mod operation;
mod recorder;
mod session;
mod step;
mod viewer;
mod waveform;

pub use annotation::*;
pub use commit::*;
pub use correction::*;
pub use operation::*;
pub use recorder::*;
pub use session::*;
pub use step::*;
pub use viewer::*;
pub use waveform::*;
