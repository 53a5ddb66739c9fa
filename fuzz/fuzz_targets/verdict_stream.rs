#![no_main]

use libfuzzer_sys::fuzz_target;
use trimcase_core::driver::run_scripted;
use trimcase_core::store::{MemorySessionStore, SessionStore};
use trimcase_core::{Config, Result, Session, Verdict};

// First byte: input length. Second: min_test_size. The rest: verdicts.
fuzz_target!(|data: &[u8]| {
    let [len, min, verdicts @ ..] = data else {
        return;
    };
    if verdicts.is_empty() {
        return;
    }

    let initial: Vec<String> = (0..*len).map(|i| format!("line {i}")).collect();
    let config = Config {
        min_test_size: usize::from(*min % 8),
    };
    let mut session = Session::new(MemorySessionStore::new(), config);

    let mut next = verdicts.iter().cycle();
    let mut judge = |candidate: &[String]| -> Result<Verdict> {
        let byte = next.next().copied().unwrap_or(0);
        let verdict = Verdict::ALL[usize::from(byte % 3)];
        // A failing candidate is never larger than its parent sequence.
        assert!(candidate.len() <= initial.len());
        Ok(verdict)
    };

    let report = run_scripted(&mut session, &mut judge, initial.clone()).unwrap();
    let output = session.store().output().unwrap();
    assert_eq!(output.len(), report.smallest_len);
    assert!(output.iter().all(|l| initial.contains(l)));
    assert!(session.store().is_finished().unwrap());
});
