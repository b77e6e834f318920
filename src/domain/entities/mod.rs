pub mod fighter;
pub mod payment_method;
pub mod payment_order;
pub mod plan_type;
pub mod reset_state;
pub mod role;
pub mod subscription;
pub mod subscription_status;
