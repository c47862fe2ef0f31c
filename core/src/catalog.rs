//! Built-in order catalog.
//!
//! These definitions are registered by
//! [`OrderRegistry::with_builtin`](crate::OrderRegistry::with_builtin). The dialogue definition is not an
//! order anyone can type; it is the schema every dialog line header is
//! checked against and is reached through [`dialog`] only.

use once_cell::sync::Lazy;

use crate::{
    CatalogPackage, ChildPolicy, Constraint, DefinitionError, LineSeed, NamedParamDef,
    OrderDefinition, Param,
};

/// Version stamped on the built-in catalog.
pub const BUILTIN_CATALOG_VERSION: &str = "1.0.0";

/// Name of the dialogue pseudo-order.
pub const DIALOG_ORDER: &str = "对话";

/// Named-parameter key selecting a portrait on dialog lines.
pub const PORTRAIT_PARAM: &str = "f";

// A failure here is a defect in this file, caught by `test_builtin_catalog_is_valid`.
static BUILTIN: Lazy<CatalogPackage> =
    Lazy::new(|| build_catalog().expect("built-in order catalog must be valid"));

static DIALOG: Lazy<OrderDefinition> =
    Lazy::new(|| build_dialog().expect("built-in dialog definition must be valid"));

/// The definition dialog line headers are validated against.
pub fn dialog() -> &'static OrderDefinition {
    &DIALOG
}

/// The built-in catalog.
pub fn builtin_catalog() -> &'static CatalogPackage {
    &BUILTIN
}

/// Clones of all built-in top-level orders.
pub fn builtin_orders() -> Vec<OrderDefinition> {
    BUILTIN.orders.clone()
}

fn build_dialog() -> Result<OrderDefinition, DefinitionError> {
    OrderDefinition::builder(DIALOG_ORDER)
        .param(
            Param::optional(Constraint::Free)
                .with_label("名称")
                .with_description("对话者的名称"),
        )
        .named(
            NamedParamDef::new(PORTRAIT_PARAM)
                .with_param(Param::required(Constraint::Free))
                .with_label("立绘"),
        )
        .build()
}

fn build_catalog() -> Result<CatalogPackage, DefinitionError> {
    let mut catalog = CatalogPackage::new(BUILTIN_CATALOG_VERSION);
    catalog.name = Some("builtin".to_string());

    catalog.orders.push(
        OrderDefinition::builder("移动")
            .description("移动一个事件")
            .param(
                Param::optional(Constraint::Free)
                    .with_label("移动对象")
                    .with_description("移动对象，默认为本事件"),
            )
            .named(
                NamedParamDef::new("t")
                    .with_param(Param::required(Constraint::RangeInt { min: 0, max: 5000 }))
                    .with_label("移动速度")
                    .with_description("移动速度，参数代表每一步的时间"),
            )
            .build()?,
    );

    catalog.orders.push(
        OrderDefinition::builder("等待")
            .description("暂停执行")
            .param(
                Param::required(Constraint::NonnegativeInt)
                    .with_init_value("500")
                    .with_label("等待时间")
                    .with_description("等待时间，单位为毫秒"),
            )
            .build()?,
    );

    let branch_arm = |name: &str, desc: &str| {
        OrderDefinition::builder(name)
            .description(desc)
            .child_policy(ChildPolicy::FreeChild)
            .build()
    };
    catalog.orders.push(
        OrderDefinition::builder("条件分歧")
            .description("按条件选择执行的分支")
            .param(
                Param::required(Constraint::Free)
                    .with_label("条件")
                    .with_description("分歧条件，通常是一个 ${...} 表达式"),
            )
            .sub_order(branch_arm("成立", "条件成立时执行")?)
            .sub_order(branch_arm("不成立", "条件不成立时执行")?)
            .child_policy(ChildPolicy::PreDefinedChild)
            .init_child(LineSeed::new("&成立"))
            .init_child(LineSeed::new("&不成立"))
            .build()?,
    );

    catalog.orders.push(
        OrderDefinition::builder("循环")
            .description("重复执行子行")
            .named(
                NamedParamDef::new("n")
                    .with_param(Param::required(Constraint::NonnegativeInt))
                    .with_label("次数"),
            )
            .child_policy(ChildPolicy::FreeChild)
            .build()?,
    );

    catalog.orders.push(
        OrderDefinition::builder("播放音频")
            .description("在指定声道播放音频")
            .param(Param::required(Constraint::Free).with_label("文件"))
            .named(
                NamedParamDef::new("v")
                    .with_param(Param::required(Constraint::RangeInt { min: 0, max: 100 }))
                    .with_label("音量"),
            )
            .named(
                NamedParamDef::new("c")
                    .with_param(Param::required(Constraint::Choice {
                        options: vec!["bgm".into(), "se".into(), "voice".into()],
                    }))
                    .with_label("声道"),
            )
            .build()?,
    );

    catalog.orders.push(
        OrderDefinition::builder("设置变量")
            .description("给变量赋值")
            .param(Param::required(Constraint::Free).with_label("变量名"))
            .param(
                Param::required(Constraint::Int)
                    .with_init_value("0")
                    .with_label("值"),
            )
            .build()?,
    );

    Ok(catalog)
}
