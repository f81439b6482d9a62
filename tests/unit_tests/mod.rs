mod config;
mod quadrature;
