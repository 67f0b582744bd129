pub mod health;
pub mod monitor;

macros_utils::routes! {
    ;
    mount health,
    mount monitor,
}
