pub mod hello;
pub mod ml;
pub mod multi_step;

pub use hello::{ProcessGreeting, SayHello};
pub use ml::{AnalyzeData, CleanData, GenerateData, GenerateReport};
pub use multi_step::{StepA, StepB, StepC};
