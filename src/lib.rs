/*!
# wayfarer

Accessible multimodal route planning for city travellers. This crate is
the consumer-facing façade over [`wayfarer_core`]: it owns id ↔ index
translation, profile lookup, clamping of user-supplied knobs, optional
per-query deadlines, and the typed query errors — everything an HTTP or
CLI adapter needs without touching graph indices directly.

```no_run
use wayfarer::Engine;

let engine = Engine::from_csv("data/nodes.csv", "data/edges.csv").unwrap();

let best = engine.route("A", "E", "pcd", false).unwrap();
println!("cost {:.1} via {:?}", best.cost, best.path);

for alt in engine.alternatives("A", "E", "standard", true, 3).unwrap() {
    println!("#{} {:.0} min, {} transfers", alt.rank, alt.total_time_min, alt.transfers);
}
```
*/

mod cache;
mod engine;

pub use cache::RouteCache;
pub use engine::{Alternative, Engine, NearbyNode, ProfileInfo, RouteSummary};
pub use wayfarer_core::prelude::*;
