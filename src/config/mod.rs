pub mod widget;

pub use widget::{ load_widget_config, ConfigError, WidgetConfig };
