//! Runners executing actual application logic.

#[cfg(test)]
use mockall::automock;
use picocontainer::injectable;
pub use picocontainer::instance_provider::ErrorPtr;

pub type ApplicationRunnerPtr = dyn ApplicationRunner + Send + Sync;

/// Runs application logic. Runners are run by the [Application](crate::application::Application)
/// after the container has been started. They need to be registered with the
/// `dyn ApplicationRunner + Send + Sync` alias to be discovered.
#[injectable]
#[cfg_attr(test, automock)]
pub trait ApplicationRunner {
    /// Runs any application code.
    fn run(&self) -> Result<(), ErrorPtr>;

    /// Returns the priority for this runner. Higher priorities get run first. Default 0.
    fn priority(&self) -> i8 {
        0
    }
}
