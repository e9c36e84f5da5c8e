//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific part of the
//! pipeline against mock adapters and a virtual clock.  Stages are driven
//! one cycle at a time, so every scenario is deterministic.

mod mock_hw;
mod stage_tests;
