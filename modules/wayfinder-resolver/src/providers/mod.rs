pub mod nominatim;
pub mod osrm;

pub use nominatim::NominatimSearch;
pub use osrm::OsrmRouter;
