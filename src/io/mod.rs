// External I/O operations module
pub mod dbus; // Resume and clock change monitoring
pub mod geolocation; // GeoClue2 position requests
pub mod input; // Terminal key, mouse and focus events
pub mod lock; // Single-instance lock file
pub mod signals; // Board events and Unix signal handling
pub mod storage; // Persisted JSON records
pub mod weather; // Open-Meteo temperature lookup
