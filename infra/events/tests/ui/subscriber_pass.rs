use arbor_event_bus::{
    ErrorHandler, EventBus, EventFailure, EventResult, EventState, Subscriber, dispatcher, event,
};
use std::sync::Arc;

#[event]
pub trait Save {
    fn save(&self, path: String) -> EventResult;
}

#[event]
pub trait Close {
    fn close(&self) -> EventResult;
}

#[derive(Subscriber)]
#[subscriber(events(Save, Close))]
#[subscriber(error_handler)]
struct Document<T: Send + Sync + 'static> {
    title: T,
}

impl<T: Send + Sync + 'static> Save for Document<T> {
    fn save(&self, _path: String) -> EventResult {
        Ok(EventState::Resolved)
    }
}

impl<T: Send + Sync + 'static> Close for Document<T> {
    fn close(&self) -> EventResult {
        Err("unsaved changes".into())
    }
}

impl<T: Send + Sync + 'static> ErrorHandler for Document<T> {
    fn on_error(&self, _failure: &EventFailure) -> EventState {
        EventState::Resolved
    }
}

fn main() {
    let bus = EventBus::new_root(dispatcher::immediate());
    let document = Arc::new(Document { title: "notes" });
    assert_eq!(document.title, "notes");
    assert_eq!(bus.subscribe(document).unwrap(), 3);

    assert_eq!(bus.publisher::<dyn Save>().save("a.txt".to_owned()), EventState::Resolved);
    assert_eq!(bus.publisher::<dyn Close>().close(), EventState::Resolved);
}
