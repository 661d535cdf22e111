pub mod books;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod users;
