// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by several layers:
//
//   checkpoint.rs — model records (Burn's CompactRecorder),
//                   the run configuration and the item
//                   vocabulary as JSON, and the pointer to
//                   the best epoch, so inference can rebuild
//                   exactly the model that was selected.
//
//   metrics.rs    — one CSV row per evaluated epoch.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Evaluation metrics CSV logger
pub mod metrics;
