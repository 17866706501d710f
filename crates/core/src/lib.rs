pub mod report;
pub mod supervisor;

pub use boundary_config::SupervisorState;
pub use report::{format_template, Arg, CaptureReporter, SerialReporter};
pub use supervisor::{CharBuffer, Supervisor};


/// The host-supplied `print(format, args...)` capability.
///
/// Reporting has no error channel: a sink that cannot deliver its output
/// drops it.
pub trait Reporter {
    fn print(&mut self, template: &str, args: &[Arg<'_>]);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn print(&mut self, template: &str, args: &[Arg<'_>]) {
        (**self).print(template, args)
    }
}
