//! World-level integration scenarios
