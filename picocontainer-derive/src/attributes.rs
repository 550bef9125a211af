use syn::{Attribute, Error, ExprPath, LitStr, Token};

pub const COMPONENT: &str = "component";

pub enum DefaultDefinition {
    Default,
    Expr(ExprPath),
}

#[derive(Default)]
pub struct FieldAttributes {
    pub default: Option<DefaultDefinition>,
    pub name: Option<LitStr>,
    pub ignore: bool,
}

impl TryFrom<&[Attribute]> for FieldAttributes {
    type Error = Error;

    fn try_from(attributes: &[Attribute]) -> Result<Self, Self::Error> {
        let mut result = Self::default();
        for attribute in attributes
            .iter()
            .filter(|attribute| attribute.path().is_ident(COMPONENT))
        {
            attribute.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    if meta.input.peek(Token![=]) {
                        let value = meta.value()?;
                        let expr: LitStr = value.parse()?;
                        result.default = Some(DefaultDefinition::Expr(expr.parse()?));
                    } else {
                        result.default = Some(DefaultDefinition::Default);
                    }
                } else if meta.path.is_ident("name") {
                    result.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("ignore") {
                    result.ignore = true;
                } else {
                    return Err(meta.error("Unsupported field attribute!"));
                }

                Ok(())
            })?;
        }

        Ok(result)
    }
}

#[derive(Default)]
pub struct ComponentAttributes {
    pub constructor: Option<ExprPath>,
    pub startable: bool,
    pub disposable: bool,
}

impl TryFrom<&[Attribute]> for ComponentAttributes {
    type Error = Error;

    fn try_from(attributes: &[Attribute]) -> Result<Self, Self::Error> {
        let mut result = Self::default();
        for attribute in attributes
            .iter()
            .filter(|attribute| attribute.path().is_ident(COMPONENT))
        {
            attribute.parse_nested_meta(|meta| {
                if meta.path.is_ident("constructor") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.constructor = Some(value.parse()?);
                } else if meta.path.is_ident("startable") {
                    result.startable = true;
                } else if meta.path.is_ident("disposable") {
                    result.disposable = true;
                } else {
                    return Err(meta.error("Unsupported component attribute!"));
                }

                Ok(())
            })?;
        }

        Ok(result)
    }
}
