// Базовые модули
pub mod name;
pub mod error;
pub mod table;
pub mod loader;
pub mod config;
pub mod metrics;

// Запись на диск и межпроцессная блокировка save-файла
pub mod persist;
pub mod lock;

// Внешний реестр параметров и узел
pub mod registry;
pub mod node;

// Встроенная шина-хост (in-process реестр + HTTP)
pub mod bus;

// Удобные реэкспорты
pub use bus::{BusReply, HostBus};
pub use config::{NodeConfig, NodeConfigBuilder};
pub use error::LoadError;
pub use loader::{load_defaults, load_file, load_persisted};
pub use name::normalize;
pub use node::{load_table, ParamNode, SaveRequest, SaveResponse, StartupTable};
pub use persist::{persist, PersistStats, WriteMode};
pub use registry::{publish, MemoryRegistry, ParamRegistry};
pub use table::{merge, ParamTable, ParamValue};
