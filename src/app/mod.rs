// Application layer: the operator-facing input sources the engine is driven by.

pub mod inputs;
