// Domain layer: core models and ports (interfaces) shared by the pipeline and adapters.

pub mod model;
pub mod ports;
