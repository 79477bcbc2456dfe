mod core;
mod ticket;
mod waiter;

pub use self::core::TaskQueue;
pub use self::ticket::Ticket;
