use arbor_event_bus::{Event, EventBus, EventResult, EventState, dispatcher, event};

#[event(name = "window.focus")]
pub trait Focus {
    /// Moves focus to `target`.
    fn focus(&self, target: String, _: (i32, i32)) -> EventResult;

    fn blur(&self) -> EventResult;
}

// Supertraits already present are kept as they are.
#[event]
trait Resize: Send + Sync {
    fn resize(&self, width: u32, height: u32) -> EventResult;
}

fn main() {
    assert_eq!(<dyn Focus as Event>::NAME, "window.focus");
    assert_eq!(<dyn Resize as Event>::NAME, "Resize");

    let bus = EventBus::new_root(dispatcher::immediate());
    let focus: FocusPublisher = bus.publisher::<dyn Focus>();
    assert_eq!(focus.focus("editor".to_owned(), (1, 2)), EventState::Passed);
    assert_eq!(focus.blur(), EventState::Passed);
    assert_eq!(bus.publisher::<dyn Resize>().resize(800, 600), EventState::Passed);
}
