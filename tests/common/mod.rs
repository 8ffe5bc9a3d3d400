pub mod app;
pub mod factory;

#[allow(unused_imports)]
pub use app::{test_config, StubCompletion, TestApp};
#[allow(unused_imports)]
pub use factory::Factory;
