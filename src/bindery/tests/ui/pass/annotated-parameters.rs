use bindery::injectable;
use bindery::{Label, Ptr};

pub struct ForAudit;
impl Label for ForAudit {}

pub trait Sink: Send + Sync {}

bindery::injectable_interface!(Sink);

pub struct Request;

bindery::require_binding!(Request);

pub struct Pipeline {
    request: Ptr<Request>,
    sink: Ptr<dyn Sink>,
    audit_sink: Ptr<dyn Sink>,
}

#[injectable]
impl Pipeline {
    #[inject]
    fn new(
        #[inject(assisted)] request: Ptr<Request>,
        #[inject(as_const)] sink: Ptr<dyn Sink>,
        #[inject(label = ForAudit)] audit_sink: Ptr<dyn Sink>,
    ) -> Self {
        Self {
            request,
            sink,
            audit_sink,
        }
    }
}

fn main() {
    let _ = Pipeline::new;
}
