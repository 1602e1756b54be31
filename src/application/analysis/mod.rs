// Support/resistance analysis over band values and order flow
pub mod level_cluster;
pub mod order_flow;
