//! Whole-graph scenarios: interface bindings, default constructors,
//! providers, shape widening and cycle reporting.

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bindery::prelude::*;
use bindery::injectable;

pub trait MessageSender: Send + Sync {
    fn send(&self, to: &str, message: &str) -> String;
}

bindery::injectable_interface!(MessageSender);

pub struct Greeting;
impl Label for Greeting {}

pub struct EmailSender {
    greeting: String,
}

#[injectable]
impl EmailSender {
    #[inject]
    fn new(#[inject(label = Greeting)] greeting: String) -> Self {
        Self { greeting }
    }
}

impl MessageSender for EmailSender {
    fn send(&self, to: &str, message: &str) -> String {
        format!("email to {to}: {} {message}", self.greeting)
    }
}

pub struct ContactList {
    names: Vec<&'static str>,
}

#[injectable]
impl ContactList {
    #[inject]
    fn new() -> Self {
        Self {
            names: vec!["alice", "bob"],
        }
    }
}

pub struct NotifierService {
    sender: Ptr<dyn MessageSender>,
    contacts: Ptr<ContactList>,
}

#[injectable]
impl NotifierService {
    #[inject]
    fn new(sender: Ptr<dyn MessageSender>, contacts: Ptr<ContactList>) -> Self {
        Self { sender, contacts }
    }

    fn notify_all(&self, message: &str) -> Vec<String> {
        self.contacts
            .names
            .iter()
            .map(|name| self.sender.send(name, message))
            .collect()
    }
}

struct NotifierModule;

impl Module for NotifierModule {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
        binder
            .bind::<At<Greeting, Val<String>>>()
            .to_value(String::from("hello,"));
        binder
            .bind::<Ptr<dyn MessageSender>>()
            .to_type::<Ptr<EmailSender>>();
        Ok(())
    }
}

#[test]
fn interface_resolves_to_the_bound_implementation() {
    let injector = Injector::create(&NotifierModule).unwrap();

    let sender = injector.get::<Ptr<dyn MessageSender>>().unwrap();
    assert_eq!(sender.send("alice", "hi"), "email to alice: hello, hi");
}

#[test]
fn each_resolution_builds_a_fresh_object() {
    let injector = Injector::create(&NotifierModule).unwrap();

    let first = injector.get::<Ptr<dyn MessageSender>>().unwrap();
    let second = injector.get::<Ptr<dyn MessageSender>>().unwrap();
    assert!(!first.ptr_eq(&second));
}

#[test]
fn transitive_graphs_build_from_a_single_request() {
    let injector = Injector::create(&NotifierModule).unwrap();

    // Neither NotifierService nor ContactList is bound anywhere; both
    // come from their declared constructors.
    let service = injector.get::<Ptr<NotifierService>>().unwrap();
    let sent = service.notify_all("ping");
    assert_eq!(
        sent,
        vec![
            "email to alice: hello, ping".to_string(),
            "email to bob: hello, ping".to_string(),
        ]
    );
}

struct FixedSenderProvider {
    instance: Ptr<EmailSender>,
    drops: Arc<AtomicUsize>,
}

impl Drop for FixedSenderProvider {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Provider for FixedSenderProvider {
    type Provided = Ptr<EmailSender>;

    fn provide(
        &self,
        _injector: &Injector,
        _ctx: &ResolveContext<'_>,
    ) -> Result<Ptr<EmailSender>, InjectError> {
        Ok(self.instance.clone())
    }
}

struct FixedSenderModule {
    instance: Ptr<EmailSender>,
    drops: Arc<AtomicUsize>,
}

impl Module for FixedSenderModule {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
        binder.bind::<Ptr<EmailSender>>().to_provider(FixedSenderProvider {
            instance: self.instance.clone(),
            drops: self.drops.clone(),
        });
        Ok(())
    }
}

#[test]
fn provider_backed_accessor_returns_the_same_pointer_every_time() {
    let instance = Ptr::new(EmailSender {
        greeting: String::from("fixed"),
    });
    let drops = Arc::new(AtomicUsize::new(0));
    let module = FixedSenderModule {
        instance: instance.clone(),
        drops: drops.clone(),
    };

    let injector = Injector::create(&module).unwrap();
    let first = injector.get::<Ptr<EmailSender>>().unwrap();
    let second = injector.get::<Ptr<EmailSender>>().unwrap();
    assert!(first.ptr_eq(&instance));
    assert!(second.ptr_eq(&instance));

    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(injector);
    // The provider was owned by its entry and destroyed exactly once.
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[derive(Clone)]
pub struct Quota {
    limit: u32,
}

bindery::require_binding!(Quota);

struct ShapesModule {
    shared: Ptr<Quota>,
}

impl Module for ShapesModule {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
        binder.bind::<Ptr<Quota>>().to_instance(self.shared.clone());
        Ok(())
    }
}

#[test]
fn const_pointer_requests_widen_and_share_the_address() {
    let shared = Ptr::new(Quota { limit: 3 });
    let injector = Injector::create(&ShapesModule {
        shared: shared.clone(),
    })
    .unwrap();

    let read = injector.get::<PtrConst<Quota>>().unwrap();
    assert!(read.ptr_eq(&shared));
    assert_eq!(read.limit, 3);
}

struct ConstShapesModule {
    shared: Ptr<Quota>,
}

impl Module for ConstShapesModule {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
        binder
            .bind::<PtrConst<Quota>>()
            .to_instance(self.shared.clone());
        Ok(())
    }
}

#[test]
fn non_const_requests_reject_const_bindings() {
    let injector = Injector::create(&ConstShapesModule {
        shared: Ptr::new(Quota { limit: 3 }),
    })
    .unwrap();

    assert!(injector.get::<PtrConst<Quota>>().is_ok());
    assert!(matches!(
        injector.get::<Ptr<Quota>>(),
        Err(InjectError::Incompatible { .. })
    ));
}

#[test]
fn pointer_requests_never_serve_value_bindings() {
    struct ValueModule;

    impl Module for ValueModule {
        fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
            binder.bind::<Val<u32>>().to_value(5);
            Ok(())
        }
    }

    let injector = Injector::create(&ValueModule).unwrap();
    assert!(matches!(
        injector.get::<Ptr<u32>>(),
        Err(InjectError::Incompatible { .. })
    ));
}

#[test]
fn reference_bindings_serve_reference_and_value_requests() {
    struct RefModule {
        config: Ptr<Quota>,
    }

    impl Module for RefModule {
        fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
            binder.bind::<Ref<Quota>>().to_ref_of(self.config.clone());
            Ok(())
        }
    }

    let injector = Injector::create(&RefModule {
        config: Ptr::new(Quota { limit: 9 }),
    })
    .unwrap();

    let by_ref = injector.get::<Ref<Quota>>().unwrap();
    assert_eq!(by_ref.limit, 9);

    // Reference to value by copy.
    let by_value = injector.get::<Val<Quota>>().unwrap();
    assert_eq!(by_value.limit, 9);
}

pub struct Chicken {
    _egg: Ptr<Egg>,
}

pub struct Egg {
    _chicken: Ptr<Chicken>,
}

#[injectable]
impl Chicken {
    #[inject]
    fn new(egg: Ptr<Egg>) -> Self {
        Self { _egg: egg }
    }
}

#[injectable]
impl Egg {
    #[inject]
    fn new(chicken: Ptr<Chicken>) -> Self {
        Self { _chicken: chicken }
    }
}

#[test]
fn cyclic_graphs_are_reported_not_overflowed() {
    struct EmptyModule;

    impl Module for EmptyModule {
        fn configure(&self, _binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
            Ok(())
        }
    }

    let injector = Injector::create(&EmptyModule).unwrap();
    assert!(matches!(
        injector.get::<Ptr<Chicken>>(),
        Err(InjectError::Cycle { .. })
    ));
}

mod mocked_collaborators {
    use super::*;

    #[mockall::automock]
    pub trait Transport: Send + Sync {
        fn deliver(&self, to: String) -> bool;
    }

    bindery::injectable_interface!(Transport);

    pub struct Courier {
        transport: Ptr<dyn Transport>,
    }

    #[injectable]
    impl Courier {
        #[inject]
        fn new(transport: Ptr<dyn Transport>) -> Self {
            Self { transport }
        }
    }

    struct MockedModule {
        transport: Ptr<dyn Transport>,
    }

    impl Module for MockedModule {
        fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
            binder
                .bind::<Ptr<dyn Transport>>()
                .to_instance(self.transport.clone());
            Ok(())
        }
    }

    #[test]
    fn mocked_interfaces_flow_through_injection() {
        let mut mock = MockTransport::new();
        mock.expect_deliver().times(2).return_const(true);

        let injector = Injector::create(&MockedModule {
            transport: Ptr::from_arc(std::sync::Arc::new(mock)),
        })
        .unwrap();

        let courier = injector.get::<Ptr<Courier>>().unwrap();
        assert!(courier.transport.deliver("alice".into()));
        assert!(courier.transport.deliver("bob".into()));
    }
}
