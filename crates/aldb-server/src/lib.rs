pub mod handlers;
pub mod presenter;
pub mod rpc;
pub mod server;

pub use handlers::HandlerState;
pub use presenter::{NavNode, NavView, NavigationPresenter};
pub use server::{start, ServerConfig, ServerHandle};
