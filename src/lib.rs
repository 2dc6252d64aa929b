//! Hospital Ops
//! 
//! Backend de operaciones hospitalarias centrado en el ciclo de vida de las
//! solicitudes de ambulancia, más un cliente tipado para consumir la API.

pub mod client;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
