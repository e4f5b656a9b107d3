//! End-to-end tests: rule text in, host effects out, across all layers.

mod rules;
