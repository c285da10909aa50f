// ============================================================
// Layer 4 — Leave-One-Out Splitter
// ============================================================
// Per user, the prefix samples are split by position in time:
//
//   last sample (target = final interaction)        → test
//   second to last (target = penultimate one)       → valid
//   everything earlier                              → train
//
// A user with two interactions contributes only a test sample;
// a user with one contributes nothing. No user's future ever
// leaks into an earlier split.

use crate::data::{
    dataset::SeqSample,
    sequences::{prefix_samples, UserHistory},
};

#[derive(Debug, Default)]
pub struct SplitSamples {
    pub train: Vec<SeqSample>,
    pub valid: Vec<SeqSample>,
    pub test:  Vec<SeqSample>,
}

pub fn leave_one_out(histories: &[UserHistory], max_len: usize) -> SplitSamples {
    let mut split = SplitSamples::default();

    for history in histories {
        let mut samples = prefix_samples(history, max_len);
        if let Some(test) = samples.pop() {
            split.test.push(test);
        }
        if let Some(valid) = samples.pop() {
            split.valid.push(valid);
        }
        split.train.extend(samples);
    }

    tracing::debug!(
        "Leave-one-out split: {} train, {} valid, {} test",
        split.train.len(),
        split.valid.len(),
        split.test.len(),
    );
    split
}
