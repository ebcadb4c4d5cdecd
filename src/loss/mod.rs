pub mod softmax;
pub mod element_wise;
pub mod batched;
pub mod parallel;
pub mod strategy;

pub use softmax::{SoftmaxLoss, SoftmaxOutput};
pub use element_wise::ElementWise;
pub use batched::Batched;
pub use parallel::ParallelElementWise;
pub use strategy::{softmax_loss, Strategy};
