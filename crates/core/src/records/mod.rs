//! Local back office records.

pub mod ports;
pub mod service;

pub use ports::{
    ClienteRepository, EntregaRepository, MotoristaRepository, PedidoRepository,
    ProdutoRepository, VeiculoRepository,
};
pub use service::{LocalStore, RecordService};
