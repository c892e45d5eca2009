#[derive(Debug)]
pub enum ReceivedEvent<T> {
    EOF,
    Event(T),
}
