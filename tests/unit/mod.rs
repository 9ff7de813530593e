// Unit tests for bitfinex-book components
//
// Organized by component:
// - orderbook: classification, book maintenance, views and the manager
// - report: ladder rendering and markdown helpers
// - config: environment configuration
