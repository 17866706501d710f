use crate::{Arg, Reporter};
use boundary_config::{BufferSpec, DemoManifest, ManifestError, ReportFormat, SupervisorState};
use boundary_primitives::{mul2, reverse_string};
use std::borrow::Cow;
use tracing::{debug, info};

/// Fixed-capacity byte buffer with a declared length, like `char word[N]`.
///
/// Bytes past the initial contents are zero. Only `[0, declared_size)` is
/// handed to the reverser and printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharBuffer {
    data: Vec<u8>,
    declared_size: usize,
}

impl CharBuffer {
    /// # Panics
    ///
    /// If `contents` does not fit in `capacity`.
    pub fn new(contents: &[u8], capacity: usize, declared_size: usize) -> Self {
        let mut data = vec![0; capacity];
        data[..contents.len()].copy_from_slice(contents);
        Self {
            data,
            declared_size,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.as_bytes(), text.len(), text.len())
    }

    pub fn from_spec(spec: &BufferSpec) -> Result<Self, ManifestError> {
        spec.validate()?;
        let capacity = spec.capacity_bytes()?;
        Ok(Self::new(spec.contents.as_bytes(), capacity, spec.declared_size()))
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn declared_size(&self) -> usize {
        self.declared_size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn declared(&self) -> &[u8] {
        &self.data[..self.declared_size]
    }

    /// Declared prefix as text. Reversing multi-byte UTF-8 yields invalid
    /// sequences, which are shown as U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.declared())
    }

    pub fn reverse(&mut self) {
        reverse_string(&mut self.data, self.declared_size);
    }
}

/// Init -> Compute -> Report -> Idle.
///
/// Each primitive runs exactly once, during Compute. The supervisor performs
/// no validation and has no error path; inputs are checked where they are
/// built (see [`Supervisor::from_manifest`]).
pub struct Supervisor<R: Reporter> {
    reporter: R,
    state: SupervisorState,
    number: i32,
    result: Option<i32>,
    buffer: Option<CharBuffer>,
    format: ReportFormat,
    idle_steps: u64,
}

impl<R: Reporter> Supervisor<R> {
    pub fn new(reporter: R, number: i32) -> Self {
        Self {
            reporter,
            state: SupervisorState::Init,
            number,
            result: None,
            buffer: None,
            format: ReportFormat::default(),
            idle_steps: 0,
        }
    }

    pub fn from_manifest(manifest: &DemoManifest, reporter: R) -> Result<Self, ManifestError> {
        let buffer = manifest
            .buffer
            .as_ref()
            .map(CharBuffer::from_spec)
            .transpose()?;

        let mut supervisor =
            Self::new(reporter, manifest.number).with_format(manifest.report.clone());
        supervisor.buffer = buffer;
        Ok(supervisor)
    }

    pub fn with_buffer(mut self, buffer: CharBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    /// Doubled value, available once Compute has run.
    pub fn result(&self) -> Option<i32> {
        self.result
    }

    pub fn buffer(&self) -> Option<&CharBuffer> {
        self.buffer.as_ref()
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub fn idle_steps(&self) -> u64 {
        self.idle_steps
    }

    /// Runs the current state's action and returns the state entered.
    pub fn step(&mut self) -> SupervisorState {
        let next = match self.state {
            SupervisorState::Init => {
                debug!(
                    "Init: number={}, buffer={:?}",
                    self.number,
                    self.buffer.as_ref().map(|b| b.text().into_owned())
                );
                SupervisorState::Compute
            }
            SupervisorState::Compute => {
                let doubled = mul2(self.number);
                info!("mul2({}) = {}", self.number, doubled);
                self.result = Some(doubled);

                if let Some(buffer) = self.buffer.as_mut() {
                    buffer.reverse();
                    info!(
                        "reverse_string(size={}) -> {:?}",
                        buffer.declared_size(),
                        buffer.text()
                    );
                }
                SupervisorState::Report
            }
            SupervisorState::Report => {
                if let Some(result) = self.result {
                    self.reporter.print(&self.format.number_format, &[Arg::Int(result)]);
                }
                if let Some(buffer) = &self.buffer {
                    let text = buffer.text();
                    self.reporter.print(&self.format.buffer_format, &[Arg::Str(&text)]);
                }
                SupervisorState::Idle
            }
            SupervisorState::Idle => {
                self.idle_steps = self.idle_steps.saturating_add(1);
                std::hint::spin_loop();
                SupervisorState::Idle
            }
        };

        if next != self.state {
            debug!("Supervisor {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        next
    }

    pub fn run_until_idle(&mut self) {
        while self.state != SupervisorState::Idle {
            self.step();
        }
    }

    /// Runs to Idle, then spends `steps` more steps there.
    pub fn idle_for(&mut self, steps: u64) {
        self.run_until_idle();
        for _ in 0..steps {
            self.step();
        }
    }

    /// Runs to Idle and never returns.
    pub fn park(mut self) -> ! {
        self.run_until_idle();
        info!("Supervisor idle");
        loop {
            self.step();
        }
    }
}
