mod controller;
mod store;
