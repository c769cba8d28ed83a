use bindery::injectable;
use bindery::{Ptr, Ref};

pub struct Registry;

#[injectable]
impl Registry {
    #[inject]
    fn new() -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct Limits {
    pub max: u32,
}

bindery::require_binding!(Limits);

pub struct Service {
    registry: Ptr<Registry>,
    limits: Limits,
    shared: Ref<Limits>,
}

#[injectable]
impl Service {
    #[inject]
    fn new(registry: Ptr<Registry>, limits: Limits, shared: Ref<Limits>) -> Self {
        Self {
            registry,
            limits,
            shared,
        }
    }
}

fn main() {
    let _ = (Service::new, Registry::new);
}
