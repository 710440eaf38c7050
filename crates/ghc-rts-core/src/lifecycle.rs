//! The RTS lifecycle state machine.

use crate::argv::{ArgvBuffer, ArgvError};
use crate::RtsRuntime;

/// Process-wide RTS state. Transitions are monotonic:
/// `NotInitialized -> Initialized -> Exited`, each edge taken at most once.
/// The underlying runtime cannot be restarted inside one process, so there
/// is deliberately no path back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RtsStatus {
    NotInitialized,
    Initialized,
    Exited,
}

/// Result of an initialize request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InitOutcome {
    /// The runtime was started by this call.
    Started,
    /// The state machine was already past `NotInitialized`; the request was
    /// a no-op and its argument list was ignored.
    AlreadyTerminal(RtsStatus),
}

impl InitOutcome {
    pub fn status(self) -> RtsStatus {
        match self {
            InitOutcome::Started => RtsStatus::Initialized,
            InitOutcome::AlreadyTerminal(status) => status,
        }
    }
}

/// Controller for one embedded runtime instance.
///
/// Exactly one `Lifecycle` exists per process; the module layer owns it and
/// serializes access. All operations run to completion on the caller's
/// thread.
pub struct Lifecycle<R> {
    status: RtsStatus,
    runtime: R,
}

impl<R: RtsRuntime> Lifecycle<R> {
    pub fn new(runtime: R) -> Self {
        Lifecycle {
            status: RtsStatus::NotInitialized,
            runtime,
        }
    }

    pub fn status(&self) -> RtsStatus {
        self.status
    }

    /// Read-only access to the runtime queries. Valid in every state; before
    /// initialization the runtime reports whatever its unstarted defaults
    /// are.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Start the runtime with the given startup options.
    ///
    /// Once `Initialized` or `Exited` this is a no-op that reports the
    /// current status; the new argument list is ignored (the runtime forbids
    /// repeated startup). A marshalling failure aborts before the
    /// initializer is reached and leaves the state unchanged.
    pub fn initialize(&mut self, args: &[String]) -> Result<InitOutcome, ArgvError> {
        match self.status {
            RtsStatus::Initialized | RtsStatus::Exited => {
                Ok(InitOutcome::AlreadyTerminal(self.status))
            }
            RtsStatus::NotInitialized => {
                let mut argv = ArgvBuffer::from_args(args)?;
                self.runtime.init(&mut argv);
                self.status = RtsStatus::Initialized;
                Ok(InitOutcome::Started)
            }
        }
    }

    /// Shut the runtime down if it is running. Idempotent at the status
    /// level; the underlying shutdown entry point runs at most once.
    pub fn exit(&mut self) -> RtsStatus {
        if self.status == RtsStatus::Initialized {
            self.runtime.shutdown();
            self.status = RtsStatus::Exited;
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    /// Recording fake: decodes every argv it is handed so tests can check
    /// the marshalled vector, and counts init/shutdown calls.
    #[derive(Default)]
    struct FakeRts {
        init_args: Vec<Vec<String>>,
        shutdowns: usize,
        profiled: bool,
        allocations: u64,
    }

    impl RtsRuntime for FakeRts {
        fn init(&mut self, argv: &mut ArgvBuffer) {
            let n = argv.len();
            let mut seen = Vec::with_capacity(n);
            for i in 0..n {
                let ptr = argv.entry(i);
                assert!(!ptr.is_null());
                let s = unsafe { CStr::from_ptr(ptr) };
                seen.push(s.to_str().unwrap().to_string());
            }
            assert!(argv.entry(n).is_null(), "missing null sentinel");
            self.init_args.push(seen);
        }

        fn shutdown(&mut self) {
            self.shutdowns += 1;
        }

        fn is_profiled(&self) -> bool {
            self.profiled
        }

        fn is_dynamic(&self) -> bool {
            false
        }

        fn allocations(&self) -> u64 {
            self.allocations
        }

        fn stats_enabled(&self) -> bool {
            false
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn happy_path_sequence() {
        let mut lc = Lifecycle::new(FakeRts::default());
        assert_eq!(lc.status(), RtsStatus::NotInitialized);

        let outcome = lc.initialize(&strings(&["+RTS", "-s", "-RTS"])).unwrap();
        assert_eq!(outcome, InitOutcome::Started);
        assert_eq!(outcome.status(), RtsStatus::Initialized);
        assert_eq!(lc.status(), RtsStatus::Initialized);

        assert_eq!(lc.exit(), RtsStatus::Exited);
        assert_eq!(lc.status(), RtsStatus::Exited);
    }

    #[test]
    fn marshalled_vector_reaches_the_runtime() {
        let mut lc = Lifecycle::new(FakeRts::default());
        lc.initialize(&strings(&["+RTS", "-N2", "-RTS"])).unwrap();
        assert_eq!(
            lc.runtime().init_args,
            vec![strings(&["+RTS", "-N2", "-RTS"])]
        );
    }

    #[test]
    fn second_initialize_ignores_its_arguments() {
        let mut lc = Lifecycle::new(FakeRts::default());
        lc.initialize(&strings(&["first"])).unwrap();

        let outcome = lc.initialize(&strings(&["second"])).unwrap();
        assert_eq!(
            outcome,
            InitOutcome::AlreadyTerminal(RtsStatus::Initialized)
        );
        assert_eq!(outcome.status(), RtsStatus::Initialized);
        // Only the first argument list was applied.
        assert_eq!(lc.runtime().init_args, vec![strings(&["first"])]);
    }

    #[test]
    fn initialize_after_exit_is_rejected() {
        let mut lc = Lifecycle::new(FakeRts::default());
        lc.initialize(&[]).unwrap();
        lc.exit();

        let outcome = lc.initialize(&strings(&["again"])).unwrap();
        assert_eq!(outcome, InitOutcome::AlreadyTerminal(RtsStatus::Exited));
        assert_eq!(lc.status(), RtsStatus::Exited);
        assert_eq!(lc.runtime().init_args.len(), 1);
    }

    #[test]
    fn exit_is_idempotent_and_shuts_down_once() {
        let mut lc = Lifecycle::new(FakeRts::default());
        lc.initialize(&[]).unwrap();
        assert_eq!(lc.exit(), RtsStatus::Exited);
        assert_eq!(lc.exit(), RtsStatus::Exited);
        assert_eq!(lc.runtime().shutdowns, 1);
    }

    #[test]
    fn exit_before_initialize_is_a_no_op() {
        let mut lc = Lifecycle::new(FakeRts::default());
        assert_eq!(lc.exit(), RtsStatus::NotInitialized);
        assert_eq!(lc.runtime().shutdowns, 0);
    }

    #[test]
    fn marshalling_failure_leaves_state_unchanged() {
        let mut lc = Lifecycle::new(FakeRts::default());
        let err = lc.initialize(&strings(&["bad\0arg"])).unwrap_err();
        assert_eq!(err, ArgvError::InteriorNul { index: 0 });
        assert_eq!(lc.status(), RtsStatus::NotInitialized);
        assert!(lc.runtime().init_args.is_empty());

        // The caller may correct the input and retry.
        lc.initialize(&strings(&["ok"])).unwrap();
        assert_eq!(lc.status(), RtsStatus::Initialized);
    }

    #[test]
    fn introspection_is_safe_before_initialize() {
        let lc = Lifecycle::new(FakeRts::default());
        assert!(!lc.runtime().is_profiled());
        assert!(!lc.runtime().is_dynamic());
        assert_eq!(lc.runtime().allocations(), 0);
        assert!(!lc.runtime().stats_enabled());
    }

    #[test]
    fn state_never_regresses() {
        let mut lc = Lifecycle::new(FakeRts::default());
        let mut observed = vec![lc.status()];
        lc.initialize(&[]).unwrap();
        observed.push(lc.status());
        lc.initialize(&[]).unwrap();
        observed.push(lc.status());
        lc.exit();
        observed.push(lc.status());
        lc.initialize(&[]).unwrap();
        observed.push(lc.status());
        lc.exit();
        observed.push(lc.status());

        assert_eq!(
            observed,
            vec![
                RtsStatus::NotInitialized,
                RtsStatus::Initialized,
                RtsStatus::Initialized,
                RtsStatus::Exited,
                RtsStatus::Exited,
                RtsStatus::Exited,
            ]
        );
    }
}
