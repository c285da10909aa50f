// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system is
// about: users interacting with items over time, and things
// that can produce or rank those interactions.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums and traits
//
// Everything here can be unit tested without a backend.

/// One user-item interaction event
pub mod interaction;

/// Core abstractions the data and application layers implement
pub mod traits;
